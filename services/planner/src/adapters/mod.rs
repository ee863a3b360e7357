pub mod db;
pub mod gemini_llm;
pub mod lesson_llm;
pub mod prompts;

pub use db::DbAdapter;
pub use gemini_llm::GeminiLessonAdapter;
pub use lesson_llm::OpenAiLessonAdapter;
