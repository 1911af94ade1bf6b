use crate::error::Result;
use crate::params::Params;
use crate::session::Session;
use serde_json::Value;

impl Session {
    /// Search accounts, statuses and hashtags.
    ///
    /// With `resolve` the server looks up remote accounts it does not know yet.
    pub async fn search(&mut self, query: &str, resolve: bool) -> Result<Value> {
        let params = Params::new()
            .with("q", query)
            .with("resolve", resolve.to_string());
        self.get("/api/v1/search".to_string(), params).await
    }
}
