use async_trait::async_trait;
use csv::{ReaderBuilder, Trim};
use log::{error, info};
use std::sync::Arc;

use crate::accounts::AccountRepositoryTrait;
use crate::assets::AssetRepositoryTrait;
use crate::constants::BATCH_SIZE;
use crate::errors::Result;
use crate::performance::{NavRow, PerformanceRepositoryTrait};
use crate::resolver::EntityResolver;

use super::batch::BatchController;
use super::ingest_model::{BatchOutcome, IngestionResult, NewStatementRecord, RowOutcome};
use super::ingest_traits::{IngestServiceTrait, StatementRepositoryTrait};
use super::report_config::{ReportConfig, ReportType};

/// Runs statement files through the normalize → adapt → resolve → batch
/// pipeline.
///
/// All collaborators are injected; the resolver and batch buffer live for
/// one `import_statements` call only.
pub struct IngestService {
    account_repository: Arc<dyn AccountRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    statement_repository: Arc<dyn StatementRepositoryTrait>,
    performance_repository: Arc<dyn PerformanceRepositoryTrait>,
}

impl IngestService {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        statement_repository: Arc<dyn StatementRepositoryTrait>,
        performance_repository: Arc<dyn PerformanceRepositoryTrait>,
    ) -> Self {
        Self {
            account_repository,
            asset_repository,
            statement_repository,
            performance_repository,
        }
    }

    async fn flush_records(
        &self,
        controller: &mut BatchController,
        batch: Vec<NewStatementRecord>,
    ) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let outcome = self.statement_repository.submit_batch(batch).await?;
        controller.record_outcome(outcome);
        Ok(())
    }

    async fn flush_nav_rows(
        &self,
        controller: &mut BatchController,
        rows: Vec<NavRow>,
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let result = self.performance_repository.upsert_nav_batch(rows).await?;
        controller.record_outcome(BatchOutcome {
            created: result.created,
            updated: result.updated,
            failed: result.failed,
            errors: Vec::new(),
        });
        Ok(())
    }
}

#[async_trait]
impl IngestServiceTrait for IngestService {
    async fn import_statements(
        &self,
        report_type: ReportType,
        content: &str,
    ) -> Result<IngestionResult> {
        let config = ReportConfig::for_type(report_type);
        let mut resolver = EntityResolver::new(
            self.account_repository.clone(),
            self.asset_repository.clone(),
        );
        resolver.preload()?;

        let mut controller = BatchController::new();
        let mut nav_buffer: Vec<NavRow> = Vec::new();

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_reader(content.as_bytes());
        let headers = reader.headers()?.clone();

        for (index, record) in reader.records().enumerate() {
            // Header occupies line 1 of the file.
            let line_number = index as u64 + 2;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    controller.note_failure(line_number, e.to_string());
                    if controller.tripped() {
                        controller.abort();
                        break;
                    }
                    continue;
                }
            };

            let raw = super::ingest_model::RawRow::new(line_number, &headers, &record);
            let adapted = match config.adapt(&raw) {
                RowOutcome::Adapted(row) => *row,
                RowOutcome::Skip(message) => {
                    controller.note_skip(line_number, message);
                    continue;
                }
                RowOutcome::Fail(message) => {
                    controller.note_failure(line_number, message);
                    if controller.tripped() {
                        controller.abort();
                        break;
                    }
                    continue;
                }
            };

            let Some(account_id) =
                resolver.resolve_account(&adapted.account_code, &adapted.currency)
            else {
                controller.note_skip(
                    line_number,
                    format!("Unresolved account {}", adapted.account_code),
                );
                continue;
            };

            if report_type == ReportType::NavHistory {
                nav_buffer.push(NavRow {
                    account_id,
                    row_date: adapted.record_date,
                    nav: adapted.amount,
                });
                if nav_buffer.len() >= BATCH_SIZE {
                    self.flush_nav_rows(&mut controller, std::mem::take(&mut nav_buffer))
                        .await?;
                }
                continue;
            }

            // A missed asset lookup leaves the reference null; the amounts
            // and dates are still worth persisting.
            let asset_id = if config.has_asset_columns() {
                resolver.resolve_asset(
                    adapted.isin.as_deref(),
                    adapted.symbol.as_deref(),
                    adapted.description.as_deref(),
                )
            } else {
                None
            };

            let reference = adapted
                .reference
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let full_batch = controller.push(NewStatementRecord {
                account_id,
                asset_id,
                report_type,
                category: adapted.category,
                record_date: adapted.record_date,
                amount: adapted.amount,
                quantity: adapted.quantity,
                unit_price: adapted.unit_price,
                currency: adapted.currency,
                description: adapted.description,
                reference,
            });
            if let Some(batch) = full_batch {
                self.flush_records(&mut controller, batch).await?;
                if controller.tripped() {
                    controller.abort();
                    break;
                }
            }
        }

        if controller.tripped() {
            controller.abort();
        } else {
            let tail = controller.drain();
            self.flush_records(&mut controller, tail).await?;
            self.flush_nav_rows(&mut controller, nav_buffer).await?;
        }

        let result = controller.finish(
            resolver.unresolved_accounts(),
            resolver.unresolved_assets(),
        );
        if result.aborted {
            error!(
                "{} import aborted after {} hard failures; {} created, {} updated retained",
                report_type, result.failed, result.created, result.updated
            );
        } else {
            info!(
                "{} import finished: {} created, {} updated, {} skipped, {} failed, {} unresolved accounts, {} unresolved assets",
                report_type,
                result.created,
                result.updated,
                result.skipped,
                result.failed,
                result.unresolved_accounts.len(),
                result.unresolved_assets.len()
            );
        }
        Ok(result)
    }
}
