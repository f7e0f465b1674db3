use env_logger::Env;

fn main() -> anyhow::Result<()> {
    // RUST_LOG=info で1手ごとの記録、debug で探索の詳細を出す
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    senet_ai::game::run()
}
