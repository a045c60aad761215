use actix_web::{App, HttpResponse, HttpServer, web};

/// Starts a local site on an ephemeral port and returns its base URL.
pub async fn start_test_server() -> String {
    let http_server = HttpServer::new(|| {
        App::new()
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("text/html; charset=utf-8")
                        .append_header(("Strict-Transport-Security", "max-age=31536000"))
                        .body(
                            "<html><head><title>Local test home page</title></head>\
                             <body><h1>Home</h1><p>pottery pottery glaze</p>\
                             <a href=\"/about\">About</a><a href=\"/moved\">Moved</a></body></html>",
                        )
                }),
            )
            .route(
                "/about",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("text/html")
                        .body("<html><head><title>About</title></head><body><p>about pottery</p><a href=\"/\">Home</a></body></html>")
                }),
            )
            .route(
                "/data.json",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("application/json")
                        .body("{\"ok\": true}")
                }),
            )
            .route(
                "/moved",
                web::get().to(|| async {
                    HttpResponse::MovedPermanently()
                        .append_header(("Location", "/about"))
                        .finish()
                }),
            )
            .route(
                "/robots.txt",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("text/plain")
                        .body("User-agent: *\nDisallow: /private\n")
                }),
            )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind test server");

    let addr = http_server
        .addrs()
        .first()
        .cloned()
        .expect("No address bound");
    let url = format!("http://{}", addr);

    let app_server = http_server.run();

    tokio::spawn(async move {
        if let Err(e) = app_server.await {
            eprintln!("Test server error: {}", e);
        }
    });

    url
}
