use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};

use open_jukebox::{
    audio::{
        registry::SessionRegistry,
        songbird_sink::{forward_track_events, SongbirdSinkFactory},
    },
    bot::{context::BotContext, JukeboxBot},
    config::Config,
    sources::YtDlpResolver,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("open_jukebox=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Open Jukebox v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Config::load()?;

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(&config).await;
    }

    info!("⚙️ Configuración: {}", config.summary());

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    // Motor de audio y registro de sesiones
    let songbird = Songbird::serenity();
    let (finished_tx, finished_rx) = flume::unbounded();
    // songbird guarda el programa como &'static str durante toda la ejecución
    let ytdlp: &'static str = Box::leak(config.ytdlp_path.clone().into_boxed_str());
    let sinks = Arc::new(SongbirdSinkFactory::new(
        songbird.clone(),
        reqwest::Client::new(),
        ytdlp,
        finished_tx,
    ));
    let registry = Arc::new(SessionRegistry::new(sinks, config.playback.default_volume));
    tokio::spawn(forward_track_events(registry.clone(), finished_rx));

    let resolver = Arc::new(YtDlpResolver::from_config(&config));
    let context = Arc::new(BotContext::new(
        registry,
        resolver,
        Arc::new(config.playback.clone()),
    ));

    let token = config.discord_token.clone();
    let handler = JukeboxBot::new(Arc::new(config), context);

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("⚠️ Señal de shutdown recibida, cerrando...");
                shard_manager.shutdown_all().await;
            }
            Err(e) => error!("Error al registrar Ctrl+C: {:?}", e),
        }
    });

    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}

async fn health_check(config: &Config) -> Result<()> {
    // Verificar dependencias críticas
    let yt_dlp = async_process::Command::new(&config.ytdlp_path)
        .arg("--version")
        .output()
        .await?;

    let ffmpeg = async_process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await?;

    if yt_dlp.status.success() && ffmpeg.status.success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Dependencias faltantes");
    }
}
