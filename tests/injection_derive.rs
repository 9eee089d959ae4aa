use modhandler::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Default)]
struct DatabaseModule {
    queries: AtomicU32,
}

impl DatabaseModule {
    fn query(&self) -> u32 {
        self.queries.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl Module for DatabaseModule {
    fn order(&self) -> i32 {
        -10
    }
}

#[derive(Default)]
struct CacheModule;

impl Module for CacheModule {}

#[derive(Default, Injectable)]
struct UsersModule {
    #[inject]
    database: Inject<DatabaseModule>,
    #[inject]
    cache: modhandler::Inject<CacheModule>,
    page_size: usize,
}

#[async_trait]
impl Module for UsersModule {
    fn set_dependencies(&self, resolver: &mut Resolver<'_>) {
        self.inject_dependencies(resolver);
    }

    async fn load(&self) -> anyhow::Result<()> {
        let database = self
            .database
            .get()
            .ok_or_else(|| anyhow::anyhow!("database not injected"))?;
        database.query();
        Ok(())
    }
}

#[derive(Default, Injectable)]
struct ReportsModule {
    #[inject]
    users: Inject<UsersModule>,
    #[inject]
    missing: Inject<AuditModule>,
}

impl Module for ReportsModule {
    fn set_dependencies(&self, resolver: &mut Resolver<'_>) {
        self.inject_dependencies(resolver);
    }
}

struct AuditModule;

impl Module for AuditModule {}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn test_derived_injection_fills_marked_fields() {
    init_tracing();
    let users = Arc::new(UsersModule::default());
    let mut handler = ModulesHandler::builder()
        .shared(Arc::clone(&users))
        .module(DatabaseModule::default())
        .module(CacheModule)
        .build()
        .unwrap();

    handler.start().await.unwrap();

    let database = handler.get::<DatabaseModule>().unwrap();
    assert!(Arc::ptr_eq(&users.database.get().unwrap(), &database));
    assert!(users.cache.is_set());
    assert_eq!(users.page_size, 0);
    // Load ran after injection and reached the database.
    assert_eq!(database.query(), 2);

    handler.stop().await.unwrap();
}

#[tokio::test]
async fn test_derived_injection_reports_each_missing_field() {
    init_tracing();
    let reports = Arc::new(ReportsModule::default());
    let mut handler = ModulesHandler::builder()
        .shared(Arc::clone(&reports))
        .module(UsersModule::default())
        .module(DatabaseModule::default())
        .module(CacheModule)
        .build()
        .unwrap();

    let errors = handler.start().await.unwrap_err();
    let configuration: Vec<_> = errors.configuration_errors().collect();
    assert_eq!(configuration.len(), 1);
    assert!(matches!(
        configuration[0],
        ConfigurationError::InjectionTargetUnresolved { target, .. } if target.ends_with("AuditModule")
    ));

    // The resolvable field is still filled.
    assert!(reports.users.is_set());
    assert!(!reports.missing.is_set());
    assert_eq!(handler.loaded_modules().len(), 4);

    handler.stop().await.unwrap();
}

#[tokio::test]
async fn test_derived_injection_resolves_from_external_provider() {
    let host = ModulesHandler::builder()
        .module(DatabaseModule::default())
        .module(CacheModule)
        .build()
        .unwrap();

    let users = Arc::new(UsersModule::default());
    let mut plugin = ModulesHandler::builder()
        .shared(Arc::clone(&users))
        .external_provider(host.registry())
        .build()
        .unwrap();

    plugin.start().await.unwrap();
    assert!(Arc::ptr_eq(
        &users.database.get().unwrap(),
        &host.get::<DatabaseModule>().unwrap()
    ));
    plugin.stop().await.unwrap();
}

#[tokio::test]
async fn test_events_reach_started_modules_only() {
    struct Ping;

    #[derive(Default)]
    struct PingCounter {
        seen: Arc<AtomicU32>,
    }

    impl Module for PingCounter {
        fn subscriptions(&self) -> Vec<Subscription> {
            let seen = Arc::clone(&self.seen);
            vec![Subscription::on(move |_: &Ping| {
                seen.fetch_add(1, Ordering::SeqCst);
            })]
        }
    }

    let counter = Arc::new(PingCounter::default());
    let bus = EventBus::new();
    let mut handler = ModulesHandler::builder()
        .shared(Arc::clone(&counter))
        .event_sink(Arc::new(bus.clone()))
        .build()
        .unwrap();

    assert_eq!(bus.publish(Ping), 0);
    handler.start().await.unwrap();
    assert_eq!(bus.publish(Ping), 1);
    handler.stop().await.unwrap();
    assert_eq!(bus.publish(Ping), 0);
    assert_eq!(counter.seen.load(Ordering::SeqCst), 1);
}
