use ipam_space::config::Settings;
use ipam_space::load_store;
use ipam_space::output::report_print;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    log4rs::init_file("log4rs.yml", Default::default())?;
    dotenv::dotenv().ok();
    log::info!("#Start main()");

    let settings = Settings::from_env();
    let data_file = std::env::args().nth(1);
    let store = load_store(data_file.as_deref(), &settings)?;

    report_print(&store, &settings)?;

    log::info!("#End main()");
    Ok(())
}
