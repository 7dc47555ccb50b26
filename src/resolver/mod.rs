pub(crate) mod entity_resolver;
pub(crate) mod resolution_cache;

pub use entity_resolver::EntityResolver;
pub use resolution_cache::ResolutionCache;
