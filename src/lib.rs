pub mod array;
pub mod chart;
pub mod config;
pub mod derive;
pub mod export;
pub mod generate;
pub mod group;
pub mod load;
pub mod missing;
pub mod orders;
pub mod pivot;
pub mod report;
pub mod reports;
pub mod schema;
pub mod select;
pub mod series;
pub mod sort;
pub mod stats;
pub mod table;
pub mod temporal;

#[cfg(test)]
pub(crate) mod test_support {
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}
