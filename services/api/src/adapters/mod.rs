pub mod db;
pub mod generation;
pub mod storage;

pub use db::DbAdapter;
pub use generation::OpenAiGenerationAdapter;
pub use storage::LocalMediaStore;
