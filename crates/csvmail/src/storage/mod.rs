pub mod filesystem;

pub use filesystem::{ensure_directory, move_file, FileStorage, ListedFile};
