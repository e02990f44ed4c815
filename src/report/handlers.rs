use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info, warn};
use serde::Serialize;
use std::path::Path;
use utoipa::ToSchema;

use crate::report::model::{GeneratedReport, ReportStatus};
use crate::report::ReportError;
use crate::{AppState, ErrorResponse};

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReportData {
    #[schema(example = 42)]
    pub id: i64,
    #[schema(example = "./storage/reports/customer_1/monthly_report_42_20250331120000.pdf")]
    pub file_path: String,
    pub status: ReportStatus,
    /// Degraded sections and font fallback, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateReportResponse {
    pub success: bool,
    pub data: GeneratedReportData,
}

pub fn error_response(err: &ReportError) -> HttpResponse {
    let body = ErrorResponse::new(err.kind(), &err.public_message());
    match err {
        ReportError::NotFound { .. } | ReportError::TemplateNotFound(_) => {
            HttpResponse::NotFound().json(body)
        }
        ReportError::TemplateParse { .. }
        | ReportError::InvalidTemplate(_)
        | ReportError::InvalidPeriodFormat(_)
        | ReportError::InvalidReportType(_) => HttpResponse::UnprocessableEntity().json(body),
        ReportError::Timeout(_) => HttpResponse::GatewayTimeout().json(body),
        ReportError::Io(_) | ReportError::Render(_) | ReportError::Store(_) => {
            HttpResponse::InternalServerError().json(body)
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Report Service",
    post,
    path = "/reports/generate/{report_id}",
    responses(
        (status = 200, description = "Report generated", body = GenerateReportResponse),
        (status = 404, description = "Report, customer or template not found", body = ErrorResponse),
        (status = 422, description = "Invalid template, period or report type", body = ErrorResponse),
        (status = 500, description = "Report could not be written", body = ErrorResponse),
        (status = 504, description = "Generation timed out", body = ErrorResponse)
    ),
    params(
        ("report_id" = i64, Path, description = "ID of the report to generate")
    )
)]
pub async fn generate_report(
    path: web::Path<i64>,
    data: web::Data<AppState>,
) -> impl Responder {
    let report_id = path.into_inner();
    info!("Executing generate_report handler for report_id: {}", report_id);

    match data.generator.generate(report_id).await {
        Ok(result) => {
            let mut warnings: Vec<String> = result
                .section_diagnostics
                .iter()
                .map(|d| d.to_string())
                .collect();
            if let Some(font) = &result.font_diagnostic {
                warn!("report {} rendered with fallback font: {}", report_id, font.reason);
                warnings.push("report font unavailable, built-in font used".to_string());
            }
            HttpResponse::Ok().json(GenerateReportResponse {
                success: true,
                data: GeneratedReportData {
                    id: result.report_id,
                    file_path: result.file_path,
                    status: result.status,
                    warnings,
                },
            })
        }
        Err(e) => {
            error!("Failed to generate report {}: {}", report_id, e);
            error_response(&e)
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Report Service",
    get,
    path = "/reports/{report_id}",
    responses(
        (status = 200, description = "Report metadata", body = GeneratedReport),
        (status = 404, description = "Report not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    ),
    params(
        ("report_id" = i64, Path, description = "ID of the report")
    )
)]
pub async fn get_report(path: web::Path<i64>, data: web::Data<AppState>) -> impl Responder {
    let report_id = path.into_inner();
    info!("Executing get_report handler for report_id: {}", report_id);

    match data.provider.find_report(report_id).await {
        Ok(Some(report)) => HttpResponse::Ok().json(report),
        Ok(None) => HttpResponse::NotFound()
            .json(ErrorResponse::not_found(&format!("report {} not found", report_id))),
        Err(e) => {
            error!("Database error while fetching report {}: {}", report_id, e);
            error_response(&ReportError::Store(e))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Report Service",
    get,
    path = "/reports/download/{report_id}",
    responses(
        (status = 200, description = "Generated PDF as an attachment (application/pdf)"),
        (status = 400, description = "Report has not been generated yet", body = ErrorResponse),
        (status = 404, description = "Report or file not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    ),
    params(
        ("report_id" = i64, Path, description = "ID of the report to download")
    )
)]
pub async fn download_report(
    req: HttpRequest,
    path: web::Path<i64>,
    data: web::Data<AppState>,
) -> HttpResponse {
    let report_id = path.into_inner();
    info!("Executing download_report handler for report_id: {}", report_id);

    let report = match data.provider.find_report(report_id).await {
        Ok(Some(report)) => report,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(ErrorResponse::not_found(&format!("report {} not found", report_id)))
        }
        Err(e) => {
            error!("Database error while fetching report {}: {}", report_id, e);
            return error_response(&ReportError::Store(e));
        }
    };

    let Some(file_path) = report.file_path.as_deref().filter(|p| !p.is_empty()) else {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&format!(
            "report {} has not been generated",
            report_id
        )));
    };

    let file = match NamedFile::open_async(file_path).await {
        Ok(file) => file,
        Err(e) => {
            error!("Report file for {} could not be opened at {}: {}", report_id, file_path, e);
            return HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                "file for report {} not found",
                report_id
            )));
        }
    };

    let filename = Path::new(file_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("report_{}.pdf", report_id));

    file.set_content_disposition(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename)],
    })
    .into_response(&req)
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/reports/generate/{report_id}").route(web::post().to(generate_report)),
    )
    .service(
        web::resource("/reports/download/{report_id}").route(web::get().to(download_report)),
    )
    .service(web::resource("/reports/{report_id}").route(web::get().to(get_report)));
}
