use std::time::Duration;

use tilegrid::{GridOptions, ListDataSource, Rect};
use tilegrid_adapter::Controller;

fn main() {
    // Example: keep the visible tiles in place while older items are loaded at the start.
    //
    // The controller captures an anchor (key + offset_in_viewport) before each pass and, when
    // the pass changed the collection, moves the scroll offset so the anchor item stays put.
    let options = GridOptions::new(|day: &u32| format!("week {}", day / 7))
        .with_initial_rect(Rect {
            main: 800,
            cross: 300,
        })
        .with_max_time_per_create_containers(Duration::MAX);
    let mut c = Controller::new(ListDataSource::new(70..140u32), options).with_preserve_anchor(true);
    c.run_until_idle();
    c.on_scroll(1200).expect("view is alive");
    c.run_until_idle();

    let anchor = c
        .capture_first_visible_anchor()
        .expect("visible range must not be empty");
    println!(
        "before prepend: off={} anchor={anchor:?}",
        c.view().scroll_offset()
    );

    for day in (63..70u32).rev() {
        c.view_mut().insert_at_start(day).expect("view is alive");
    }
    let mut anchored = 0;
    loop {
        let frame = c.tick();
        anchored += frame.anchored as usize;
        if frame.pending.is_idle() {
            break;
        }
    }

    println!(
        "after prepend: anchored {anchored} times, off={} anchor={:?}",
        c.view().scroll_offset(),
        c.capture_first_visible_anchor()
    );
}
