#[macro_use]
extern crate log;

mod feed;

use abstutil::prettyprint_usize;
use futures_channel::mpsc::UnboundedReceiver;
use geom::{Circle, Distance, GPSBounds, LonLat, PolyLine, Polygon, Pt2D};
use structopt::StructOpt;
use widgetry::mapspace::{ObjectID, World};
use widgetry::tools::PopupMsg;
use widgetry::{
    Cached, Color, Drawable, EventCtx, GeomBatch, GfxCtx, HorizontalAlignment, Line, Panel,
    SharedAppState, State, Text, Transition, UpdateType, VerticalAlignment, Widget,
};

use model::{Registry, StepTable, Vehicle, VehicleID};

use self::feed::FeedEvent;

#[derive(StructOpt)]
struct Args {
    /// The websocket URL serving JSON batches of vehicle positions
    #[structopt(long, default_value = "ws://localhost:8080/data.json")]
    url: String,
}

fn main() {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args());

    widgetry::run(
        widgetry::Settings::new("Live vehicle positions"),
        move |ctx| {
            info!("Connecting to {}", args.url);
            let app = App {
                registry: Registry::new(),
                table: StepTable::new(),
                feed: feed::spawn(args.url),
                gps_bounds: None,
                status: "connecting".to_string(),
            };
            let states = vec![Viewer::new(ctx, &app)];
            (app, states)
        },
    );
}

pub struct App {
    registry: Registry,
    table: StepTable,
    feed: UnboundedReceiver<FeedEvent>,
    /// Fixed by the first non-empty batch; every projection afterwards goes through it
    gps_bounds: Option<GPSBounds>,
    status: String,
}

impl SharedAppState for App {
    fn draw_default(&self, g: &mut GfxCtx) {
        g.clear(Color::BLACK);
    }
}

impl App {
    /// Auto-frame the initial view around the first batch. Happens once per session.
    fn fit_viewport(&mut self, ctx: &mut EventCtx, pts: &Vec<LonLat>) {
        let mut gps_bounds = GPSBounds::new();
        for pt in pts {
            gps_bounds.update(*pt);
            // A batch with a single vehicle would otherwise make a degenerate zero-area
            // world
            gps_bounds.update(LonLat::new(pt.x() - 0.001, pt.y() - 0.001));
            gps_bounds.update(LonLat::new(pt.x() + 0.001, pt.y() + 0.001));
        }
        let bounds = gps_bounds.to_bounds();
        ctx.canvas.map_dims = (bounds.max_x, bounds.max_y);
        ctx.canvas.center_on_map_pt(bounds.center());
        self.gps_bounds = Some(gps_bounds);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Obj {
    Vehicle(usize),
}
impl ObjectID for Obj {}

struct Viewer {
    panel: Panel,
    world: World<Obj>,
    // Indexed by Obj::Vehicle, rebuilt together with the world
    ids: Vec<VehicleID>,
    draw_trails: Drawable,
    hover_trail: Cached<Obj, Drawable>,
}

impl Viewer {
    fn new(ctx: &mut EventCtx, app: &App) -> Box<dyn State<App>> {
        let panel = Panel::new_builder(Widget::col(vec![
            Line("Live vehicle positions")
                .small_heading()
                .into_widget(ctx),
            Widget::placeholder(ctx, "status"),
        ]))
        .aligned(HorizontalAlignment::Left, VerticalAlignment::Top)
        .build(ctx);

        let mut state = Self {
            panel,
            world: World::unbounded(),
            ids: Vec::new(),
            draw_trails: Drawable::empty(ctx),
            hover_trail: Cached::new(),
        };
        state.rebuild(ctx, app);
        Box::new(state)
    }

    fn rebuild(&mut self, ctx: &mut EventCtx, app: &App) {
        let status = Text::from_multiline(vec![
            Line(format!("Feed: {}", app.status)),
            Line(format!(
                "Vehicles: {}",
                prettyprint_usize(app.registry.len())
            )),
            Line(format!("Pending frames: {}", app.table.remaining_frames())),
        ])
        .into_widget(ctx);
        self.panel.replace(ctx, "status", status);

        let gps_bounds = match app.gps_bounds {
            Some(ref b) => b,
            None => {
                return;
            }
        };

        let mut world = World::unbounded();
        let mut trails = GeomBatch::new();
        let mut ids = Vec::new();
        // TODO We really need unzoomed circles
        let radius = Distance::meters(50.0);

        for vehicle in app.registry.vehicles() {
            let color = Color::rgb(
                vehicle.color.r as i32,
                vehicle.color.g as i32,
                vehicle.color.b as i32,
            );
            if let Some(polygon) = trail_polygon(vehicle, gps_bounds, Distance::meters(10.0)) {
                trails.push(color.alpha(0.8), polygon);
            }

            let mut txt = Text::from(format!("{:?}", vehicle.id));
            if let Some(time) = last_update_time(vehicle) {
                txt.add_line(Line(format!("Last update: {time}")));
            }

            world
                .add(Obj::Vehicle(ids.len()))
                .hitbox(Circle::new(vehicle.pos.to_pt(gps_bounds), radius).to_polygon())
                .draw_color(color)
                .hover_alpha(0.5)
                .tooltip(txt)
                .build(ctx);
            ids.push(vehicle.id.clone());
        }
        world.initialize_hover(ctx);

        self.world = world;
        self.ids = ids;
        self.draw_trails = ctx.upload(trails);
    }
}

impl State<App> for Viewer {
    fn event(&mut self, ctx: &mut EventCtx, app: &mut App) -> Transition<App> {
        ctx.canvas_movement();

        let mut changed = false;
        while let Ok(Some(ev)) = app.feed.try_next() {
            changed = true;
            match ev {
                FeedEvent::Connected => {
                    info!("Feed connected");
                    app.status = "connected".to_string();
                }
                FeedEvent::Batch(raw) => match model::parse_batch(&raw) {
                    Ok(records) => {
                        let pts = app.registry.process_batch(records, &mut app.table);
                        if app.gps_bounds.is_none() && !pts.is_empty() {
                            app.fit_viewport(ctx, &pts);
                        }
                    }
                    Err(err) => {
                        warn!("Skipping a malformed feed message: {}", err);
                    }
                },
                FeedEvent::Disconnected => {
                    warn!("Feed connection closed; no more updates are coming");
                    app.status = "closed".to_string();
                }
                FeedEvent::Unavailable(err) => {
                    app.status = "unavailable".to_string();
                    self.rebuild(ctx, app);
                    return Transition::Push(PopupMsg::new_state(
                        ctx,
                        "Feed unavailable",
                        vec![
                            format!("Can't reach the vehicle feed: {}", err),
                            "Nothing to show".to_string(),
                        ],
                    ));
                }
            }
        }

        // One animation frame per display tick
        if ctx.input.nonblocking_is_update_event().is_some() {
            if let Some(frame) = app.table.next_frame() {
                for op in frame {
                    app.registry.apply(&op);
                }
                changed = true;
            }
        }

        if changed {
            self.rebuild(ctx, app);
        }

        self.world.event(ctx);

        let ids = &self.ids;
        self.hover_trail.update(self.world.get_hovering(), |obj| {
            let Obj::Vehicle(idx) = obj;
            let mut batch = GeomBatch::new();
            if let (Some(gps_bounds), Some(vehicle)) =
                (app.gps_bounds.as_ref(), app.registry.get(&ids[idx]))
            {
                if let Some(polygon) = trail_polygon(vehicle, gps_bounds, Distance::meters(15.0)) {
                    batch.push(Color::CYAN, polygon);
                }
            }
            ctx.upload(batch)
        });

        ctx.request_update(UpdateType::Game);
        Transition::Keep
    }

    fn draw(&self, g: &mut GfxCtx, _: &App) {
        g.redraw(&self.draw_trails);
        self.world.draw(g);
        if let Some(draw) = self.hover_trail.value() {
            g.redraw(draw);
        }
        self.panel.draw(g);
    }
}

/// The trail as drawn geometry, or None if it hasn't gone anywhere yet
fn trail_polygon(vehicle: &Vehicle, gps_bounds: &GPSBounds, width: Distance) -> Option<Polygon> {
    let pts = Pt2D::approx_dedupe(
        vehicle.trail.iter().map(|pt| pt.to_pt(gps_bounds)).collect(),
        Distance::meters(1.0),
    );
    if pts.len() < 2 {
        return None;
    }
    Some(PolyLine::unchecked_new(pts).make_polygons(width))
}

fn last_update_time(vehicle: &Vehicle) -> Option<String> {
    let dt = chrono::DateTime::from_timestamp_millis(vehicle.last_update?)?;
    Some(dt.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
}
