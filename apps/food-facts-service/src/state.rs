use off_client::OffClient;

#[derive(Clone)]
pub struct AppState {
    pub off_client: OffClient,
}
