//! the test_utils folder here will share utils or test components between
//! unit tests of different modules
mod fake_host;

pub use common::*;
pub use fake_host::*;
pub use mock_type_config::*;
