mod controls;
mod legend;
mod panels;
