fn main() {
    kava::cli::run();
}
