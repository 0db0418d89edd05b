//! Knowledge-base management example: create a dataset, add a document from
//! text, poll indexing, then query retrieval.
//!
//! Run with:
//! ```bash
//! export DIFY_DATASET_API_KEY="dataset-your-api-key"
//! cargo run --example knowledge_base
//! ```

use dify_client::apis::knowledge::{
    CreateDatasetRequest, CreateDocumentByTextRequest, IndexingTechnique, RetrieveRequest,
};
use dify_client::{DifyOptions, KnowledgeBaseClient};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("DIFY_DATASET_API_KEY")
        .expect("DIFY_DATASET_API_KEY environment variable must be set");

    let client = KnowledgeBaseClient::new(api_key.as_str(), &DifyOptions::default())?;

    let dataset = client
        .create_dataset(&CreateDatasetRequest {
            description: Some("demo dataset".to_string()),
            indexing_technique: Some(IndexingTechnique::Economy),
            ..CreateDatasetRequest::new("demo-notes")
        })
        .await?;
    println!("created dataset {}", dataset.id);

    let created = client
        .create_document_by_text(
            &dataset.id,
            &CreateDocumentByTextRequest::new(
                "release-notes.md",
                "We ship a new release every six weeks.",
            ),
        )
        .await?;
    println!("created document {:?}", created.document.name);

    loop {
        let status = client.indexing_status(&dataset.id, &created.batch).await?;
        let done = status
            .data
            .iter()
            .all(|d| d.indexing_status == "completed");
        if done {
            break;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    println!("indexing completed");

    let hits = client
        .retrieve(
            &dataset.id,
            &RetrieveRequest {
                query: "How often are releases?".to_string(),
                retrieval_model: None,
            },
        )
        .await?;

    for record in hits.records {
        println!(
            "{:.2}  {}",
            record.score.unwrap_or_default(),
            record.segment.content
        );
    }

    Ok(())
}
