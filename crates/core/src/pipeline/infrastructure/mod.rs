pub mod chunked_pipeline_executor;
