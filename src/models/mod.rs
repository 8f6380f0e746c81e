mod bundle;
mod category;
mod entry;
mod group;

pub use bundle::ExportBundle;
pub use category::Category;
pub use entry::{Entry, EntryPatch};
pub use group::Group;

#[cfg(test)]
mod tests;
