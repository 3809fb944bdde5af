pub mod ipgeo;
