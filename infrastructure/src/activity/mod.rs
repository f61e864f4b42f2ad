mod memory;

pub use memory::InMemoryActivityStore;
