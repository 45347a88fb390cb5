use toon_viewer::{flow, scene::ViewerFlow};

fn main() -> anyhow::Result<()> {
    flow::run(vec![ViewerFlow::constructor()])
}
