// Example: a multisize grouped grid, a few queued edits and the container events they produce.
use std::time::Duration;

use tilegrid::{
    ContainerEvent, GridOptions, GridView, GroupInfo, ItemSize, LayoutOptions, ListDataSource,
    Rect,
};

#[derive(Clone, Debug)]
struct Photo {
    album: &'static str,
    wide: bool,
}

fn main() {
    let photos: Vec<Photo> = ["beach", "city", "forest"]
        .into_iter()
        .flat_map(|album| (0..12).map(move |i| Photo { album, wide: i % 4 == 0 }))
        .collect();

    let layout = LayoutOptions::default()
        .with_group_info(Some(GroupInfo::cell_spanning(100, 100)))
        .with_gutter(4);
    let options = GridOptions::new(|p: &Photo| p.album.to_string())
        .with_layout(layout)
        .with_item_info(|_, p: &Photo| {
            if p.wide {
                ItemSize::new(300, 200)
            } else {
                ItemSize::new(100, 100)
            }
        })
        .with_initial_rect(Rect {
            main: 1280,
            cross: 420,
        })
        .with_max_time_per_create_containers(Duration::from_millis(2));

    let mut view = GridView::new(ListDataSource::new(photos), options);
    let mut ready = view.ready();
    let passes = view.settle();
    println!(
        "ready={:?} after {passes} passes, lanes={} total_extent={}",
        ready.result(),
        view.lanes(),
        view.total_extent()
    );
    for group in view.groups() {
        println!(
            "group {:>6}: items {}..{} header={:?}",
            group.key,
            group.start_index,
            group.end_index(),
            view.header_geometry(view.group_index_of(group.start_index).unwrap_or(0))
        );
    }
    view.take_container_events();

    let first = view.key_of(0).expect("non-empty");
    let mut inserted = view
        .insert_after(
            first,
            Photo {
                album: "beach",
                wide: true,
            },
        )
        .expect("view is alive");
    let mut moved = view.move_to_end(first).expect("view is alive");
    let second = view.key_of(1).expect("non-empty");
    view.change(
        second,
        Photo {
            album: "beach",
            wide: false,
        },
    )
    .expect("view is alive");
    view.selection_set(&[1, 2]).expect("indices in range");
    view.settle();

    println!("inserted={:?} moved={:?}", inserted.result(), moved.result());
    println!("selection={:?}", view.selection_indices());
    let mut counts = [0usize; 4];
    for event in view.take_container_events() {
        match event {
            ContainerEvent::Realized { .. } => counts[0] += 1,
            ContainerEvent::Moved { .. } => counts[1] += 1,
            ContainerEvent::Changed { .. } => counts[2] += 1,
            ContainerEvent::Released { .. } => counts[3] += 1,
        }
    }
    println!(
        "realized={} moved={} changed={} released={}",
        counts[0], counts[1], counts[2], counts[3]
    );
}
