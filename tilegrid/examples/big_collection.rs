// Example: a large uniform grid; only the window around the viewport gets containers.
use std::time::Duration;

use tilegrid::{Align, GridOptions, GridView, ListDataSource, Rect};

fn main() {
    let options = GridOptions::new(|n: &u32| format!("{:03}", n / 1000))
        .with_initial_rect(Rect {
            main: 1920,
            cross: 1080,
        })
        .with_overscan(8)
        .with_max_time_per_create_containers(Duration::from_millis(4));
    let mut view = GridView::new(ListDataSource::new(0..1_000_000u32), options);
    view.settle();
    println!(
        "count={} groups={} containers={} realized={:?}",
        view.count(),
        view.group_count(),
        view.container_count(),
        view.viewport_state().realized
    );

    let offset = view.scroll_target(750_000, Align::Center);
    view.set_scroll_offset(offset).expect("view is alive");
    let passes = view.settle();
    println!(
        "after scroll: offset={} passes={passes} containers={} realized={:?}",
        view.scroll_offset(),
        view.container_count(),
        view.viewport_state().realized
    );
}
