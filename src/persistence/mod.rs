pub mod files;
pub mod migration;
pub mod schema;
pub mod store;

pub use files::{
    atomic_write, ensure_tracker_dir, get_tracker_dir, init_local_dir, read_file, tracker_file,
};
pub use migration::{migrate, to_document};
pub use schema::{StoredDocument, CURRENT_VERSION};
pub use store::{load_tracker, parse_tracker, save_tracker, serialize_tracker, StoreError};
