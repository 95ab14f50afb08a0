pub mod lotofacil_pipeline;
