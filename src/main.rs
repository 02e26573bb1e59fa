fn main() {
    numerology_planner::cli::run();
}
