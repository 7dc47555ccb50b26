pub(crate) mod batch;
pub(crate) mod ingest_errors;
pub(crate) mod ingest_model;
pub(crate) mod ingest_repository;
pub(crate) mod ingest_service;
pub(crate) mod ingest_traits;
pub(crate) mod normalizer;
pub(crate) mod report_config;

pub use batch::BatchController;
pub use ingest_errors::IngestError;
pub use ingest_model::{
    AdaptedRow, BatchOutcome, IngestionResult, NewStatementRecord, RawRow, RowDiagnostic,
    RowOutcome, StatementRecordDB,
};
pub use ingest_repository::StatementRepository;
pub use ingest_service::IngestService;
pub use ingest_traits::{IngestServiceTrait, StatementRepositoryTrait};
pub use report_config::{ReportConfig, ReportType};
