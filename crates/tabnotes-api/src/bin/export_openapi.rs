// Export OpenAPI specification as JSON
//
// Usage: cargo run --bin export-openapi > docs/openapi.json

use anyhow::Result;
use tabnotes_api::openapi::ApiDoc;

fn main() -> Result<()> {
    println!("{}", ApiDoc::to_json()?);
    Ok(())
}
