use crate::error::Result;
use crate::params::Params;
use crate::session::Session;
use serde_json::Value;

impl Session {
    /// Information about the server.
    pub async fn instance(&mut self) -> Result<Value> {
        self.get("/api/v1/instance".to_string(), Params::new()).await
    }
}
