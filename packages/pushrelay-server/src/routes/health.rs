pub(crate) async fn handler() -> &'static str {
    "ok"
}
