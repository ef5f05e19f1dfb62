use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use serde::Deserialize;
use std::sync::Mutex;

use crate::parser::{parse_clock_time, parse_matches};
use crate::schedule::{LifecycleState, OutcomeKind, SchedulerConfig, SchedulerError};

// One lifecycle per running instance; the mutex serializes every
// read-modify-write so concurrent transitions cannot interleave.
pub struct AppState {
    pub lifecycle: Mutex<LifecycleState>,
}

fn default_judge_pairs() -> u32 {
    4
}

fn default_slot_minutes() -> i64 {
    10
}

fn default_block_minutes() -> i64 {
    8
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    #[serde(default = "default_judge_pairs")]
    judge_pairs: u32,
    #[serde(default = "default_slot_minutes")]
    slot_minutes: i64,
    #[serde(default = "default_block_minutes")]
    block_minutes: i64,
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    end_time: String,
    #[serde(default)]
    match_schedule: String,
}

#[derive(Deserialize)]
pub struct TeamRequest {
    team: String,
}

#[derive(Deserialize)]
pub struct ActiveScheduleRequest {
    schedule_id: String,
}

#[derive(Deserialize, Default)]
pub struct PrintRequest {
    label: Option<String>,
}

fn error_response(err: &SchedulerError) -> HttpResponse {
    let body = serde_json::json!({"error": err.to_string()});
    match err {
        SchedulerError::UnknownTeam(_) | SchedulerError::UnknownSchedule(_) => {
            HttpResponse::NotFound().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn state_response(state: &LifecycleState) -> HttpResponse {
    HttpResponse::Ok().json(state)
}

fn build_config(req: &GenerateRequest) -> std::result::Result<SchedulerConfig, SchedulerError> {
    Ok(SchedulerConfig {
        judge_pairs: req.judge_pairs,
        slot_minutes: req.slot_minutes,
        block_minutes: req.block_minutes,
        start_time: parse_clock_time(&req.start_time, "judging start time")?,
        end_time: parse_clock_time(&req.end_time, "judging end time")?,
    })
}

async fn get_state(state: web::Data<AppState>) -> Result<HttpResponse> {
    let lifecycle = state.lifecycle.lock().unwrap();
    Ok(state_response(&lifecycle))
}

async fn generate(
    req: web::Json<GenerateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let config = match build_config(&req) {
        Ok(config) => config,
        Err(err) => return Ok(error_response(&err)),
    };
    let matches = match parse_matches(&req.match_schedule) {
        Ok(matches) => matches,
        Err(err) => return Ok(error_response(&err)),
    };

    let mut lifecycle = state.lifecycle.lock().unwrap();
    match lifecycle.generate(config, &matches) {
        Ok(()) => Ok(state_response(&lifecycle)),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn record_outcome(
    kind: OutcomeKind,
    req: web::Json<TeamRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let team = req.team.trim();
    if team.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({"error": "Missing team."})));
    }

    let mut lifecycle = state.lifecycle.lock().unwrap();
    match lifecycle.record_outcome(kind, team) {
        Ok(()) => Ok(state_response(&lifecycle)),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn checkoff(req: web::Json<TeamRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    record_outcome(OutcomeKind::Checkoff, req, state).await
}

async fn noshow(req: web::Json<TeamRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    record_outcome(OutcomeKind::NoShow, req, state).await
}

async fn not_competing(
    req: web::Json<TeamRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    record_outcome(OutcomeKind::NotCompeting, req, state).await
}

async fn generate_noshow(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut lifecycle = state.lifecycle.lock().unwrap();
    match lifecycle.generate_noshow() {
        Ok(()) => Ok(state_response(&lifecycle)),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn snapshot_print(
    req: Option<web::Json<PrintRequest>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let req = req.map(|r| r.into_inner()).unwrap_or_default();
    let mut lifecycle = state.lifecycle.lock().unwrap();
    match lifecycle.snapshot_print(req.label.as_deref()) {
        Ok(_) => Ok(state_response(&lifecycle)),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn set_active_schedule(
    req: web::Json<ActiveScheduleRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = req.schedule_id.trim();
    if id.is_empty() {
        return Ok(
            HttpResponse::BadRequest().json(serde_json::json!({"error": "Missing schedule id."}))
        );
    }

    let mut lifecycle = state.lifecycle.lock().unwrap();
    match lifecycle.switch_active(id) {
        Ok(()) => Ok(state_response(&lifecycle)),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn reset(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut lifecycle = state.lifecycle.lock().unwrap();
    lifecycle.reset();
    Ok(state_response(&lifecycle))
}

pub async fn start_server(port: u16) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState {
        lifecycle: Mutex::new(LifecycleState::new()),
    });

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .route("/api/state", web::get().to(get_state))
            .route("/api/generate", web::post().to(generate))
            .route("/api/checkoff", web::post().to(checkoff))
            .route("/api/noshow", web::post().to(noshow))
            .route("/api/not-competing", web::post().to(not_competing))
            .route("/api/generate-noshow", web::post().to(generate_noshow))
            .route("/api/snapshot-print", web::post().to(snapshot_print))
            .route("/api/active-schedule", web::post().to(set_active_schedule))
            .route("/api/reset", web::post().to(reset))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
