#[actix_web::main]
async fn main() -> std::io::Result<()> {
    inspection_report_server::run().await
}
