/* 📖 # Why an API module in staticapi_engine?

The api module adapts the route table to the PAL's HttpService trait, so the same
service runs on RealPal's tiny_http server in production and on MockPal's
simulated requests in tests.
*/

mod service;

pub use service::{ApiService, DOCS_JSON_PATH, DOCS_PATH, RAW_PREFIX};
