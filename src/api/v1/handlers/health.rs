/*
 * Responsibility
 * - GET /health (liveness, outside the access gate)
 */
pub async fn health() -> &'static str {
    "ok"
}
