// Copyright © 2024 blitzbeaver contributors


mod test_config;
mod test_distance;
mod test_graph;
mod test_scorer;
