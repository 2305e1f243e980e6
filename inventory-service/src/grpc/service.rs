//! gRPC service implementation for InventoryService.

use crate::error::{InventoryError, InventoryResult};
use crate::grpc::convert::{
    parse_date, parse_date_or_today, parse_id, parse_ledger, parse_module, parse_period,
};
use crate::grpc::proto::*;
use crate::models::{NewDailySale, RecordInputs, RecordPatch};
use crate::services::{
    record_error, record_grpc_request, record_grpc_request_duration, InventoryService,
    SaleRequest, SortOrder,
};
use service_core::grpc::{into_response, GrpcResult};
use std::time::Instant;
use tonic::Request;

/// InventoryService gRPC implementation.
pub struct InventoryServiceImpl {
    service: InventoryService,
}

impl InventoryServiceImpl {
    pub fn new(service: InventoryService) -> Self {
        Self { service }
    }
}

/// Record request metrics and map domain errors onto gRPC status codes.
fn respond<T>(method: &'static str, started: Instant, result: InventoryResult<T>) -> GrpcResult<T> {
    record_grpc_request_duration(method, started.elapsed().as_secs_f64());
    match &result {
        Ok(_) => record_grpc_request(method, "ok"),
        Err(e) => {
            record_grpc_request(method, "error");
            record_error(e.kind());
            tracing::debug!(method = method, error = %e, "Request failed");
        }
    }
    into_response(result)
}

#[tonic::async_trait]
impl inventory_service_server::InventoryService for InventoryServiceImpl {
    // =========================================================================
    // Records
    // =========================================================================

    async fn create_record(
        &self,
        request: Request<CreateRecordRequest>,
    ) -> GrpcResult<CreateRecordResponse> {
        let started = Instant::now();
        let req = request.into_inner();
        tracing::info!(module = req.module, name = %req.name, "Creating record");

        let result = async {
            let inputs = RecordInputs::try_from(req)?;
            let record = self.service.create_record(inputs).await?;
            Ok::<_, InventoryError>(CreateRecordResponse {
                record: Some(record.into()),
            })
        }
        .await;
        respond("create_record", started, result)
    }

    async fn get_record(
        &self,
        request: Request<GetRecordRequest>,
    ) -> GrpcResult<GetRecordResponse> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            let record = self.service.get_record(parse_id(&req.record_id)?).await?;
            Ok::<_, InventoryError>(GetRecordResponse {
                record: Some(record.into()),
            })
        }
        .await;
        respond("get_record", started, result)
    }

    async fn list_records(
        &self,
        request: Request<ListRecordsRequest>,
    ) -> GrpcResult<ListRecordsResponse> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            let module = parse_module(req.module)?;
            let order = if req.oldest_first {
                SortOrder::OldestFirst
            } else {
                SortOrder::NewestFirst
            };
            let records = self.service.list_records(module, order).await?;
            Ok::<_, InventoryError>(ListRecordsResponse {
                records: records.into_iter().map(Into::into).collect(),
            })
        }
        .await;
        respond("list_records", started, result)
    }

    async fn update_record(
        &self,
        request: Request<UpdateRecordRequest>,
    ) -> GrpcResult<UpdateRecordResponse> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            let record_id = parse_id(&req.record_id)?;
            let patch = RecordPatch::try_from(&req)?;
            let record = self.service.update_record(record_id, patch).await?;
            Ok::<_, InventoryError>(UpdateRecordResponse {
                record: Some(record.into()),
            })
        }
        .await;
        respond("update_record", started, result)
    }

    async fn delete_record(
        &self,
        request: Request<DeleteRecordRequest>,
    ) -> GrpcResult<DeleteRecordResponse> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            self.service.delete_record(parse_id(&req.record_id)?).await?;
            Ok::<_, InventoryError>(DeleteRecordResponse {})
        }
        .await;
        respond("delete_record", started, result)
    }

    // =========================================================================
    // Sales
    // =========================================================================

    async fn record_sale(
        &self,
        request: Request<RecordSaleRequest>,
    ) -> GrpcResult<RecordSaleResponse> {
        let started = Instant::now();
        let req = request.into_inner();
        tracing::info!(record_id = %req.record_id, quantity = req.quantity, "Recording sale");

        let result = async {
            let sale_request = SaleRequest {
                record_id: parse_id(&req.record_id)?,
                quantity: req.quantity,
                sold_on: req.sold_on.as_deref().map(parse_date).transpose()?,
                sold_by: req.sold_by.filter(|s| !s.trim().is_empty()),
            };
            let (sale, record) = self.service.record_sale(sale_request).await?;
            Ok::<_, InventoryError>(RecordSaleResponse {
                sale: Some(sale.into()),
                record: Some(record.into()),
            })
        }
        .await;
        respond("record_sale", started, result)
    }

    async fn list_sales(
        &self,
        request: Request<ListSalesRequest>,
    ) -> GrpcResult<ListSalesResponse> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            let module = parse_module(req.module)?;
            let day = parse_date_or_today(req.date.as_deref())?;
            let listing = self.service.list_sales(module, Some(day)).await?;
            Ok::<_, InventoryError>(ListSalesResponse {
                sales: listing.sales.into_iter().map(Into::into).collect(),
                total_sales: listing.total_sales.to_string(),
                total_profit: listing.total_profit.to_string(),
            })
        }
        .await;
        respond("list_sales", started, result)
    }

    async fn delete_sale(
        &self,
        request: Request<DeleteSaleRequest>,
    ) -> GrpcResult<DeleteSaleResponse> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            self.service.delete_sale(parse_id(&req.sale_id)?).await?;
            Ok::<_, InventoryError>(DeleteSaleResponse {})
        }
        .await;
        respond("delete_sale", started, result)
    }

    // =========================================================================
    // Daily sales
    // =========================================================================

    async fn add_daily_sale(
        &self,
        request: Request<AddDailySaleRequest>,
    ) -> GrpcResult<AddDailySaleResponse> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            let entry = NewDailySale::try_from(req)?;
            let saved = self.service.add_daily_sale(entry).await?;
            Ok::<_, InventoryError>(AddDailySaleResponse {
                entry: Some(saved.into()),
            })
        }
        .await;
        respond("add_daily_sale", started, result)
    }

    async fn delete_daily_sale(
        &self,
        request: Request<DeleteDailySaleRequest>,
    ) -> GrpcResult<DeleteDailySaleResponse> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            self.service
                .delete_daily_sale(parse_id(&req.entry_id)?)
                .await?;
            Ok::<_, InventoryError>(DeleteDailySaleResponse {})
        }
        .await;
        respond("delete_daily_sale", started, result)
    }

    async fn get_monthly_report(
        &self,
        request: Request<GetMonthlyReportRequest>,
    ) -> GrpcResult<GetMonthlyReportResponse> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            let ledger = parse_ledger(req.ledger)?;
            let period = parse_period(&req.period)?;
            let report = self.service.monthly_report(ledger, period).await?;
            Ok::<GetMonthlyReportResponse, InventoryError>(report.into())
        }
        .await;
        respond("get_monthly_report", started, result)
    }

    // =========================================================================
    // Exports
    // =========================================================================

    async fn export_module_report(
        &self,
        request: Request<ExportModuleReportRequest>,
    ) -> GrpcResult<ExportResponse> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            let module = parse_module(req.module)?;
            let as_of = parse_date_or_today(req.as_of.as_deref())?;
            let export = self.service.export_module_report(module, as_of).await?;
            tracing::info!(
                filename = %export.filename,
                rows = export.row_count,
                "Module report exported"
            );
            Ok::<ExportResponse, InventoryError>(export.into())
        }
        .await;
        respond("export_module_report", started, result)
    }

    async fn export_daily_sales(
        &self,
        request: Request<ExportDailySalesRequest>,
    ) -> GrpcResult<ExportResponse> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            let ledger = parse_ledger(req.ledger)?;
            let period = parse_period(&req.period)?;
            let export = self.service.export_daily_sales(ledger, period).await?;
            tracing::info!(
                filename = %export.filename,
                rows = export.row_count,
                "Daily sales exported"
            );
            Ok::<ExportResponse, InventoryError>(export.into())
        }
        .await;
        respond("export_daily_sales", started, result)
    }

    // =========================================================================
    // Overview
    // =========================================================================

    async fn get_dashboard_summary(
        &self,
        _request: Request<GetDashboardSummaryRequest>,
    ) -> GrpcResult<GetDashboardSummaryResponse> {
        let started = Instant::now();
        let result: Result<_, InventoryError> = self
            .service
            .dashboard_summary()
            .await
            .map(Into::into);
        respond("get_dashboard_summary", started, result)
    }
}
