pub mod traits;
pub mod wait;
pub mod webdriver;

pub use traits::{BrowserSession, SessionFactory};
pub use wait::WaitPolicy;
pub use webdriver::WebDriverFactory;
