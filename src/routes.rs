use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::assets::serve_embedded;
use crate::error::render_failures;
use crate::handler::{self, AppState};

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handler::home))
        .route("/health", get(api::healthcheck))
        .route("/books", get(handler::list_books))
        .route("/books/new", get(handler::new_book_form).post(handler::create_book))
        .route("/books/:id", get(handler::show_book).post(handler::update_book))
        .route("/books/:id/delete", get(handler::confirm_delete).post(handler::delete_book))
        .route("/api/books", get(api::get_books))
        .route("/api/books/:id", get(api::get_book))
        .fallback(serve_embedded)
        .layer(middleware::from_fn_with_state(state.clone(), render_failures))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::catalog::Catalog;
    use crate::db::Database;
    use crate::model::NewBook;

    struct TestApp {
        router: Router,
        db: Arc<Database>,
    }

    struct TestResponse {
        status: StatusCode,
        location: Option<String>,
        content_type: Option<String>,
        body: String,
    }

    async fn test_app(development: bool) -> TestApp {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let router = app(AppState {
            db: db.clone(),
            development,
        });
        TestApp { router, db }
    }

    impl TestApp {
        fn catalog(&self) -> Catalog<'_> {
            Catalog::new(self.db.connection())
        }

        async fn seed(&self, title: &str, author: &str) -> i32 {
            self.catalog()
                .create_book(&NewBook {
                    title: title.to_string(),
                    author: author.to_string(),
                    genre: None,
                    year: None,
                })
                .await
                .unwrap()
                .id
        }

        async fn send(&self, request: Request<Body>) -> TestResponse {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let header_value = |name: header::HeaderName| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            let status = response.status();
            let location = header_value(header::LOCATION);
            let content_type = header_value(header::CONTENT_TYPE);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

            TestResponse {
                status,
                location,
                content_type,
                body: String::from_utf8(bytes.to_vec()).unwrap(),
            }
        }

        async fn get(&self, uri: &str) -> TestResponse {
            self.send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
        }

        async fn post(&self, uri: &str, form: &str) -> TestResponse {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap();
            self.send(request).await
        }
    }

    #[tokio::test]
    async fn test_root_redirects_to_first_page() {
        let app = test_app(false).await;

        let res = app.get("/").await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location.as_deref(), Some("/books?page=1"));
    }

    #[tokio::test]
    async fn test_create_then_view_book() {
        let app = test_app(false).await;
        app.seed("Anathem", "Stephenson").await;
        app.seed("Emma", "Austen").await;

        let res = app
            .post("/books/new", "title=Dune&author=Herbert&genre=Sci-Fi&year=1965")
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location.as_deref(), Some("/books"));

        let listing = app.get("/books").await;
        assert_eq!(listing.status, StatusCode::OK);
        let anathem = listing.body.find("Anathem").unwrap();
        let dune = listing.body.find("Dune").unwrap();
        let emma = listing.body.find("Emma").unwrap();
        assert!(anathem < dune && dune < emma);

        let books = app.catalog().search_books("dune").await.unwrap();
        let detail = app.get(&format!("/books/{}", books[0].id)).await;
        assert_eq!(detail.status, StatusCode::OK);
        assert!(detail.body.contains(r#"id="title" value="Dune""#));
        assert!(detail.body.contains(r#"id="author" value="Herbert""#));
        assert!(detail.body.contains(r#"id="genre" value="Sci-Fi""#));
        assert!(detail.body.contains(r#"id="year" value="1965""#));
    }

    #[tokio::test]
    async fn test_create_with_empty_title_persists_nothing() {
        let app = test_app(false).await;

        let res = app.post("/books/new", "title=&author=X&genre=&year=").await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(res.body.contains("Title is required"));
        assert!(res.body.contains(r#"id="author" value="X""#));
        assert_eq!(app.catalog().count_books().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_new_book_form() {
        let app = test_app(false).await;

        let res = app.get("/books/new").await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains(r#"action="/books/new""#));
    }

    #[tokio::test]
    async fn test_update_book() {
        let app = test_app(false).await;
        let id = app.seed("Dune", "Herbert").await;

        let res = app
            .post(&format!("/books/{id}"), "title=Dune+Messiah&author=Herbert&genre=&year=1969")
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location.as_deref(), Some("/books"));

        let book = app.catalog().get_book(id).await.unwrap().unwrap();
        assert_eq!(book.title, "Dune Messiah");
        assert_eq!(book.year, Some(1969));
    }

    #[tokio::test]
    async fn test_invalid_update_keeps_row() {
        let app = test_app(false).await;
        let id = app.seed("Dune", "Herbert").await;

        let res = app.post(&format!("/books/{id}"), "title=Changed&author=&genre=&year=").await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(res.body.contains(&format!(r#"action="/books/{id}""#)));
        assert!(res.body.contains(r#"id="title" value="Changed""#));
        assert!(res.body.contains("Author is required"));

        let book = app.catalog().get_book(id).await.unwrap().unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Herbert");
    }

    #[tokio::test]
    async fn test_update_missing_book_is_not_found() {
        let app = test_app(false).await;

        let res = app.post("/books/41", "title=Dune&author=Herbert").await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert!(res.body.contains("Page Not Found"));
        assert_eq!(app.catalog().count_books().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_and_malformed_ids_are_not_found() {
        let app = test_app(false).await;

        assert_eq!(app.get("/books/7").await.status, StatusCode::NOT_FOUND);
        assert_eq!(app.get("/books/seven").await.status, StatusCode::NOT_FOUND);
        assert_eq!(app.get("/books/7/delete").await.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_flow() {
        let app = test_app(false).await;
        let id = app.seed("Dune", "Herbert").await;

        let confirm = app.get(&format!("/books/{id}/delete")).await;
        assert_eq!(confirm.status, StatusCode::OK);
        assert!(confirm.body.contains(&format!(r#"action="/books/{id}/delete""#)));
        assert_eq!(app.catalog().count_books().await.unwrap(), 1);

        let res = app.post(&format!("/books/{id}/delete"), "").await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location.as_deref(), Some("/books"));
        assert_eq!(app.catalog().count_books().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_book_keeps_rows() {
        let app = test_app(false).await;
        app.seed("Dune", "Herbert").await;

        let res = app.post("/books/999/delete", "").await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(app.catalog().count_books().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_listing() {
        let app = test_app(false).await;
        app.seed("Dune", "Herbert").await;
        app.seed("Emma", "Austen").await;

        let res = app.get("/books?search=HERB").await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains("Dune"));
        assert!(!res.body.contains("Emma"));

        let none = app.get("/books?search=tolkien").await;
        assert_eq!(none.status, StatusCode::OK);
        assert!(none.body.contains("No books match"));
    }

    #[tokio::test]
    async fn test_search_listing_folds_non_ascii_case() {
        let app = test_app(false).await;
        app.seed("Émile", "Rousseau").await;
        app.seed("Emma", "Austen").await;

        for query in ["%C3%89mile", "%C3%89MILE", "%C3%A9mile"] {
            let res = app.get(&format!("/books?search={query}")).await;
            assert_eq!(res.status, StatusCode::OK);
            assert!(res.body.contains("Émile"), "no match for {query}");
            assert!(!res.body.contains("Emma"));
        }
    }

    #[tokio::test]
    async fn test_page_past_the_end() {
        let app = test_app(false).await;
        app.seed("Dune", "Herbert").await;

        let res = app.get("/books?page=99").await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(!res.body.contains("Dune"));
    }

    #[tokio::test]
    async fn test_unknown_route_renders_not_found() {
        let app = test_app(false).await;

        let res = app.get("/nowhere").await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert!(res.body.contains("Page Not Found"));
    }

    #[tokio::test]
    async fn test_wrong_form_content_type_renders_error_page() {
        let app = test_app(false).await;
        let id = app.seed("Dune", "Herbert").await;

        for uri in ["/books/new".to_string(), format!("/books/{id}")] {
            let request = Request::builder()
                .method("POST")
                .uri(uri.as_str())
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("title=Other&author=Someone"))
                .unwrap();
            let res = app.send(request).await;
            assert_eq!(res.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
            assert!(res.content_type.as_deref().unwrap_or_default().starts_with("text/html"));
            assert!(res.body.contains("Unsupported Media Type"));
        }

        assert_eq!(app.catalog().count_books().await.unwrap(), 1);
        assert_eq!(app.catalog().get_book(id).await.unwrap().unwrap().title, "Dune");
    }

    #[tokio::test]
    async fn test_serves_stylesheet() {
        let app = test_app(false).await;

        let res = app.get("/stylesheets/style.css").await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.content_type.as_deref(), Some("text/css"));
    }

    #[tokio::test]
    async fn test_store_failure_hides_detail_in_production() {
        let app = test_app(false).await;
        app.db.connection().execute("DROP TABLE books", ()).await.unwrap();

        let res = app.get("/books").await;
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.body.contains("Server Error"));
        assert!(!res.body.contains("no such table"));
    }

    #[tokio::test]
    async fn test_store_failure_shows_detail_in_development() {
        let app = test_app(true).await;
        app.db.connection().execute("DROP TABLE books", ()).await.unwrap();

        let res = app.get("/books").await;
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.body.contains("no such table"));
    }

    #[tokio::test]
    async fn test_api_books() {
        let app = test_app(false).await;
        let id = app.seed("Dune", "Herbert").await;

        let res = app.get("/api/books?page=1").await;
        assert_eq!(res.status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&res.body).unwrap();
        assert_eq!(body["total"], 1);
        assert_eq!(body["pages"], 1);
        assert_eq!(body["books"][0]["title"], "Dune");

        let one = app.get(&format!("/api/books/{id}")).await;
        let book: serde_json::Value = serde_json::from_str(&one.body).unwrap();
        assert_eq!(book["author"], "Herbert");

        assert_eq!(app.get("/api/books/404").await.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_healthcheck() {
        let app = test_app(false).await;

        let res = app.get("/health").await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains("ok"));
    }
}
