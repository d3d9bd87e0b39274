pub mod collection;
pub mod recognition;

pub use collection::{BlueprintStore, JsonFileStore, MemoryStore, StoreError};
pub use recognition::{
    RecognitionConfig, RecognitionError, RecognitionResult, Recognizer, SlotMatch,
    TemplateLibrary, TemplateSource,
};
