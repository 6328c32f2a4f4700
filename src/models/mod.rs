pub mod resource;

pub use resource::{CloudResource, ResourceTags, SortColumn};
