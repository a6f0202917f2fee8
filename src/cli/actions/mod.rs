pub mod server;

pub use server::Args;

#[derive(Debug)]
pub enum Action {
    Server(Args),
}
