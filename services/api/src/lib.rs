mod cli;
mod demo;
mod infra;
mod lookup;
mod routes;
mod server;

use housing_eligibility::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
