fn main() {
    pump_efficiency::cli::run();
}
