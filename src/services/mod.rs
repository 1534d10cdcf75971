pub mod atlas_client;
pub mod inspector;
pub mod report_writer;
pub mod scanner;

pub use atlas_client::AtlasClient;
pub use inspector::MongoInspector;
pub use scanner::CodeScanner;
