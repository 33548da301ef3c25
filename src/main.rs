//! Timetable Admin Console Entry Point
//!
//! Loads one resource collection, applies an optional search query and
//! prints the visible rows plus any UI events the controller raised.
//!
//! Usage: `timetable-admin [degrees|modules|students] [query]`

use std::rc::Rc;

use timetable_admin_ui::config::{AdminConfig, TOKEN_ENV};
use timetable_admin_ui::controller::ControllerOptions;
use timetable_admin_ui::gateway::{Gateway, GatewayReferences, MemoryGateway, ReqwestTransport, RestGateway};
use timetable_admin_ui::models::{CourseModule, Degree, Student};
use timetable_admin_ui::{AuthContext, Entity, EventLog, EventSink, ResourceController};

fn gateway_for<E: Entity>(config: &AdminConfig, auth: &Rc<AuthContext>) -> Rc<dyn Gateway<E>> {
    match &config.api_base_url {
        Some(base) => Rc::new(RestGateway::<E, _>::new(base.clone(), Rc::clone(auth), ReqwestTransport::new())),
        None => Rc::new(MemoryGateway::with_records(E::fixtures())),
    }
}

async fn show<E: Entity>(controller: ResourceController<E, Rc<dyn Gateway<E>>>, query: Option<&str>, events: &EventLog) {
    controller.load().await;
    if let Some(query) = query {
        controller.set_query(query);
    }

    println!("{} ({} of {})", E::schema().label, controller.visible().len(), controller.entities().len());
    for entity in controller.visible() {
        match serde_json::to_string(&entity) {
            Ok(row) => println!("  {}", row),
            Err(e) => log::error!("[CONTROLLER] cannot render {}: {}", entity.id(), e),
        }
    }
    for event in events.drain() {
        println!("! {:?}", event);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = match AdminConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rolling_logger::init_with(config.logger_config()) {
        eprintln!("File logging disabled: {}", e);
    }

    let auth = Rc::new(match std::env::var(TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => AuthContext::signed_in(token),
        _ => AuthContext::anonymous(),
    });
    let events = Rc::new(EventLog::new());
    let sink: Rc<dyn EventSink> = events.clone();
    let options = ControllerOptions::from(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let resource = args.first().map(String::as_str).unwrap_or("degrees");
    let query = args.get(1).map(String::as_str);
    let _ = rolling_logger::info(&format!(
        "[CONTROLLER] console started for {} ({})",
        resource,
        config.api_base_url.as_deref().unwrap_or("offline")
    ));

    match resource {
        "degrees" => {
            let controller = ResourceController::builder(gateway_for::<Degree>(&config, &auth), auth.clone(), sink)
                .options(options)
                .build();
            show(controller, query, &events).await;
        }
        "modules" => {
            let controller = ResourceController::builder(gateway_for::<CourseModule>(&config, &auth), auth.clone(), sink)
                .options(options)
                .reference("degrees", Rc::new(GatewayReferences::<Degree, _>::new(gateway_for::<Degree>(&config, &auth))))
                .build();
            show(controller, query, &events).await;
        }
        "students" => {
            let controller = ResourceController::builder(gateway_for::<Student>(&config, &auth), auth.clone(), sink)
                .options(options)
                .reference("degrees", Rc::new(GatewayReferences::<Degree, _>::new(gateway_for::<Degree>(&config, &auth))))
                .reference("modules", Rc::new(GatewayReferences::<CourseModule, _>::new(gateway_for::<CourseModule>(&config, &auth))))
                .build();
            show(controller, query, &events).await;
        }
        other => {
            let _ = rolling_logger::error(&format!("[CONTROLLER] unknown resource '{}'", other));
            eprintln!("Unknown resource '{}'. Expected degrees, modules or students.", other);
            std::process::exit(2);
        }
    }
}
