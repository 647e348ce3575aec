//! Web search provider factory.

use crate::client::WebSearch;
use crate::tavily::TavilyClient;
use std::sync::Arc;

/// Create a web search client.
///
/// # Arguments
/// * `provider` - Provider identifier ("tavily")
/// * `api_key` - Provider API key
/// * `search_depth` - Provider-specific depth setting
/// * `endpoint` - Optional custom endpoint URL
pub fn create_search_client(
    provider: &str,
    api_key: Option<&str>,
    search_depth: &str,
    endpoint: Option<&str>,
) -> Result<Arc<dyn WebSearch>, String> {
    match provider.to_lowercase().as_str() {
        "tavily" => {
            let api_key = api_key.ok_or_else(|| "Tavily search requires API key".to_string())?;
            let mut client = TavilyClient::new(api_key).with_search_depth(search_depth);
            if let Some(endpoint) = endpoint {
                client = client.with_endpoint(endpoint);
            }
            Ok(Arc::new(client))
        }
        _ => Err(format!("Unknown search provider: {}", provider)),
    }
}
