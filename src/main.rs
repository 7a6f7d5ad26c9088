use profile_feed::{AppState, Config, router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::load()?;
    let addr = config.bind_addr.clone();

    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("API Endpoints:");
    info!("  GET    /health                           - Health check");
    info!("  POST   /auth/signup                      - Create account");
    info!("  POST   /auth/login                       - Login");
    info!("  GET    /users/me                         - Current user (auth)");
    info!("  GET    /users/:uid/posts                 - Load a profile's posts (auth)");
    info!("  GET    /feed                             - Cached feed (auth)");
    info!("  POST   /posts                            - Create post (auth)");
    info!("  GET    /posts/:id                        - Refresh post (auth)");
    info!("  PUT    /posts/:id                        - Edit post (auth)");
    info!("  DELETE /posts/:id                        - Delete post (auth)");
    info!("  POST   /posts/:id/like                   - Like (auth)");
    info!("  DELETE /posts/:id/like                   - Unlike (auth)");
    info!("  POST   /posts/:id/like/toggle            - Toggle like (auth)");
    info!("  GET    /posts/:id/comments               - Load comments (auth)");
    info!("  POST   /posts/:id/comments               - Comment (auth)");
    info!("  DELETE /posts/:id/comments/:comment_id   - Delete comment (auth)");
    info!("  GET    /media/posts/:filename            - Uploaded images");

    axum::serve(listener, app).await?;
    Ok(())
}
