fn main() {
    pool_spawner::game::run();
}
