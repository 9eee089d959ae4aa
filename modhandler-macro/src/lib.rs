use proc_macro::TokenStream;

mod injectable;

/// Derive macro wiring `#[inject]` fields into the module resolver
///
/// Generates `modhandler::Injectable`, whose `inject_dependencies` fills every
/// field marked `#[inject]`. Marked fields must be `Inject<T>`.
///
/// # Example
/// ```ignore
/// use modhandler::prelude::*;
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     #[inject]
///     repository: Inject<UserRepository>,
///     retries: u32,
/// }
///
/// impl Module for UserService {
///     fn set_dependencies(&self, resolver: &mut Resolver<'_>) {
///         self.inject_dependencies(resolver);
///     }
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}
