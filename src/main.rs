use marketplace::{configuration::Settings, jobs::spawn_background_jobs, startup::Application, telemetry::{get_subscriber, init_subscriber}};

#[actix_web::main]
async fn main() -> anyhow::Result<()>{
    let subscriber = get_subscriber("marketplace".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let settings = Settings::try_get()?;
    let jobs = settings.jobs.clone();

    let application = Application::new(settings).await?;
    tracing::info!("Listening on {}:{}", application.host, application.port);

    let _jobs = spawn_background_jobs(application.pool.clone(), application.tracking_client.clone(), &jobs);

    application.server.await?;
    Ok(())
}
