use crate::{
    error::GenerationError,
    hf::Generator,
    models::{
        BackendInfo, GenerationRequest, ImageArtifact, GUIDANCE_SCALE_RANGE, STEPS_RANGE,
    },
    presenter::{self, DOWNLOAD_FILE_NAME, PNG_MIME},
};
use actix_web::{
    http::{header, StatusCode},
    web, App, HttpResponse, HttpServer, ResponseError,
};
use serde_json::json;

pub struct AppState {
    pub generator: Generator,
}

impl ResponseError for GenerationError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenerationError::NetworkFailure(_) => StatusCode::GATEWAY_TIMEOUT,
            GenerationError::ProviderError { .. }
            | GenerationError::UnexpectedContentType { .. }
            | GenerationError::UndecodableResponse(_) => StatusCode::BAD_GATEWAY,
            GenerationError::LocalModelLoadFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            GenerationError::MissingCredential { .. }
            | GenerationError::GenerationFailure(_)
            | GenerationError::ConfigError(_)
            | GenerationError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/generate", web::post().to(generate_page))
        .route("/api/generate", web::post().to(generate_png))
        .route("/api/info", web::get().to(backend_info))
        .route("/health", web::get().to(health));
}

pub async fn run(host: &str, port: u16, generator: Generator) -> std::io::Result<()> {
    let state = web::Data::new(AppState { generator });

    log::info!("🌐 Listening on http://{}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}

async fn index(state: web::Data<AppState>) -> HttpResponse {
    html(render_page(
        &state.generator.info(),
        &GenerationRequest::default(),
        Outcome::Empty,
    ))
}

async fn generate_page(
    state: web::Data<AppState>,
    form: web::Form<GenerationRequest>,
) -> HttpResponse {
    let request = form.into_inner();
    let outcome = match state.generator.generate(&request).await {
        Ok(artifact) => Outcome::Image(artifact),
        Err(e) => Outcome::Error(e),
    };
    html(render_page(&state.generator.info(), &request, outcome))
}

async fn generate_png(
    state: web::Data<AppState>,
    request: web::Json<GenerationRequest>,
) -> Result<HttpResponse, GenerationError> {
    let artifact = state.generator.generate(&request).await?;
    Ok(HttpResponse::Ok()
        .content_type(PNG_MIME)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
        ))
        .body(artifact.png))
}

async fn backend_info(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.generator.info())
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

enum Outcome {
    Empty,
    Image(ImageArtifact),
    Error(GenerationError),
}

fn render_page(info: &BackendInfo, request: &GenerationRequest, outcome: Outcome) -> String {
    let disabled = if info.available { "" } else { " disabled" };
    let unavailable = match &info.unavailable_reason {
        Some(reason) => format!(
            r#"<p class="error">Model unavailable: {}</p>"#,
            escape_html(reason)
        ),
        None => String::new(),
    };

    let result = match outcome {
        Outcome::Empty => String::new(),
        Outcome::Image(artifact) => {
            let uri = presenter::data_uri(&artifact);
            format!(
                r#"<figure><img src="{uri}" alt="Generated Image" style="max-width:100%"><figcaption>Generated Image</figcaption></figure>
<p><a href="{uri}" download="{name}">⬇️ Download PNG</a></p>"#,
                uri = uri,
                name = DOWNLOAD_FILE_NAME
            )
        }
        Outcome::Error(e) => format!(r#"<p class="error">❌ {}</p>"#, escape_html(&e.to_string())),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Text-to-Image</title>
<style>body{{font-family:sans-serif;max-width:720px;margin:2em auto}}.error{{color:#b00020}}label{{display:block;margin-top:1em}}</style>
</head>
<body>
<h1>🚀 Text → Image</h1>
<p>Using <strong>{model}</strong> ({kind})</p>
{unavailable}
<form method="post" action="/generate" onsubmit="this.querySelector('button').disabled=true;document.getElementById('loading').hidden=false">
<label>Enter an image prompt:<br><input type="text" name="prompt" value="{prompt}" size="60"></label>
<label>Guidance Scale: <output>{guidance}</output><br>
<input type="range" name="guidance_scale" min="{gmin}" max="{gmax}" step="0.1" value="{guidance}" oninput="this.previousElementSibling.previousElementSibling.value=this.value"></label>
<label>Inference Steps: <output>{steps}</output><br>
<input type="range" name="steps" min="{smin}" max="{smax}" step="1" value="{steps}" oninput="this.previousElementSibling.previousElementSibling.value=this.value"></label>
<p><button type="submit"{disabled}>🎨 Generate Image</button></p>
<p id="loading" hidden>⏳ Calling the inference endpoint... Please wait</p>
</form>
{result}
</body>
</html>"#,
        model = escape_html(&info.model),
        kind = info.kind.as_str(),
        unavailable = unavailable,
        prompt = escape_html(&request.prompt),
        guidance = request.guidance_scale,
        gmin = GUIDANCE_SCALE_RANGE.start(),
        gmax = GUIDANCE_SCALE_RANGE.end(),
        steps = request.steps,
        smin = STEPS_RANGE.start(),
        smax = STEPS_RANGE.end(),
        disabled = disabled,
        result = result,
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
