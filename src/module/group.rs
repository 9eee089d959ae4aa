use super::{Module, TypeKey};
use std::fmt;
use std::sync::Arc;

/// One entry handed to the handler at construction time.
///
/// Groups are expanded depth-first during registration and never occupy a
/// registry slot of their own.
pub enum RegistrationItem {
    Leaf {
        key: TypeKey,
        module: Arc<dyn Module>,
    },
    Group(ModuleGroup),
}

impl RegistrationItem {
    pub fn module<M: Module>(module: M) -> Self {
        Self::shared(Arc::new(module))
    }

    /// Register an instance the caller keeps a handle to.
    pub fn shared<M: Module>(module: Arc<M>) -> Self {
        Self::Leaf {
            key: TypeKey::of::<M>(),
            module,
        }
    }

    pub fn group(group: ModuleGroup) -> Self {
        Self::Group(group)
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<(TypeKey, &'a Arc<dyn Module>)>) {
        match self {
            Self::Leaf { key, module } => out.push((*key, module)),
            Self::Group(group) => {
                for item in &group.items {
                    item.collect_leaves(out);
                }
            }
        }
    }
}

impl From<ModuleGroup> for RegistrationItem {
    fn from(group: ModuleGroup) -> Self {
        Self::Group(group)
    }
}

impl fmt::Debug for RegistrationItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf { key, .. } => f.debug_tuple("Leaf").field(key).finish(),
            Self::Group(group) => fmt::Debug::fmt(group, f),
        }
    }
}

/// A named bundle of modules, possibly nested.
///
/// # Example
///
/// ```rust,ignore
/// let storage = ModuleGroup::new("storage")
///     .with(DatabaseModule::default())
///     .with(CacheModule::default());
///
/// let handler = ModulesHandler::builder()
///     .group(storage)
///     .module(ApiModule::default())
///     .build()?;
/// ```
pub struct ModuleGroup {
    name: String,
    items: Vec<RegistrationItem>,
}

impl ModuleGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn with<M: Module>(mut self, module: M) -> Self {
        self.items.push(RegistrationItem::module(module));
        self
    }

    pub fn with_shared<M: Module>(mut self, module: Arc<M>) -> Self {
        self.items.push(RegistrationItem::shared(module));
        self
    }

    pub fn with_group(mut self, group: ModuleGroup) -> Self {
        self.items.push(RegistrationItem::Group(group));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[RegistrationItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<RegistrationItem> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every leaf reachable from this group, depth-first.
    pub fn leaves(&self) -> Vec<(TypeKey, &Arc<dyn Module>)> {
        let mut out = Vec::new();
        for item in &self.items {
            item.collect_leaves(&mut out);
        }
        out
    }

    /// Initialize every leaf in sequence, stopping at the first failure.
    ///
    /// Only for hosts that drive a group without a handler; the handler
    /// flattens groups and never calls these.
    pub async fn initialize_all(&self) -> anyhow::Result<()> {
        for (_, module) in self.leaves() {
            module.initialize().await?;
        }
        Ok(())
    }

    pub async fn load_all(&self) -> anyhow::Result<()> {
        for (_, module) in self.leaves() {
            module.load().await?;
        }
        Ok(())
    }

    pub async fn unload_all(&self) -> anyhow::Result<()> {
        for (_, module) in self.leaves() {
            module.unload().await?;
        }
        Ok(())
    }
}

impl fmt::Debug for ModuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleGroup")
            .field("name", &self.name)
            .field("items", &self.items)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Journal = Arc<Mutex<Vec<&'static str>>>;

    struct First(Journal);
    struct Second;
    struct Third(Journal);

    #[async_trait]
    impl Module for First {
        async fn initialize(&self) -> anyhow::Result<()> {
            self.0.lock().unwrap().push("first");
            Ok(())
        }

        async fn load(&self) -> anyhow::Result<()> {
            self.0.lock().unwrap().push("first:load");
            Ok(())
        }

        async fn unload(&self) -> anyhow::Result<()> {
            self.0.lock().unwrap().push("first:unload");
            Ok(())
        }
    }

    #[async_trait]
    impl Module for Second {
        async fn initialize(&self) -> anyhow::Result<()> {
            anyhow::bail!("second refuses to start")
        }

        async fn load(&self) -> anyhow::Result<()> {
            anyhow::bail!("second refuses to load")
        }

        async fn unload(&self) -> anyhow::Result<()> {
            anyhow::bail!("second refuses to unload")
        }
    }

    #[async_trait]
    impl Module for Third {
        async fn initialize(&self) -> anyhow::Result<()> {
            self.0.lock().unwrap().push("third");
            Ok(())
        }

        async fn load(&self) -> anyhow::Result<()> {
            self.0.lock().unwrap().push("third:load");
            Ok(())
        }

        async fn unload(&self) -> anyhow::Result<()> {
            self.0.lock().unwrap().push("third:unload");
            Ok(())
        }
    }

    #[test]
    fn test_leaves_are_depth_first() {
        let journal = Journal::default();
        let group = ModuleGroup::new("outer")
            .with(First(journal.clone()))
            .with_group(ModuleGroup::new("inner").with(Second))
            .with(Third(journal));

        let names: Vec<_> = group.leaves().iter().map(|(key, _)| *key).collect();
        assert_eq!(
            names,
            vec![
                TypeKey::of::<First>(),
                TypeKey::of::<Second>(),
                TypeKey::of::<Third>()
            ]
        );
    }

    #[tokio::test]
    async fn test_group_delegation_stops_at_first_failure() {
        let journal = Journal::default();
        let group = ModuleGroup::new("outer")
            .with(First(journal.clone()))
            .with(Second)
            .with(Third(journal.clone()));

        assert!(group.initialize_all().await.is_err());
        assert_eq!(*journal.lock().unwrap(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_load_and_unload_delegate_in_order() {
        let journal = Journal::default();
        let group = ModuleGroup::new("outer")
            .with(First(journal.clone()))
            .with_group(ModuleGroup::new("inner").with(Third(journal.clone())));

        group.load_all().await.unwrap();
        group.unload_all().await.unwrap();
        assert_eq!(
            *journal.lock().unwrap(),
            vec!["first:load", "third:load", "first:unload", "third:unload"]
        );
    }

    #[tokio::test]
    async fn test_load_and_unload_stop_at_first_failure() {
        let journal = Journal::default();
        let group = ModuleGroup::new("outer")
            .with(First(journal.clone()))
            .with(Second)
            .with(Third(journal.clone()));

        let error = group.load_all().await.unwrap_err();
        assert!(error.to_string().contains("refuses to load"));
        let error = group.unload_all().await.unwrap_err();
        assert!(error.to_string().contains("refuses to unload"));
        assert_eq!(*journal.lock().unwrap(), vec!["first:load", "first:unload"]);
    }
}
