pub fn run(path: Option<&str>) {
    let config = super::load_config(path).unwrap_or_else(|e| super::fail(e));
    super::print_json(&config);
}
